//! Two-phase analysis pipeline
//!
//! Pass 1 drains the whole corpus into the registry before pass 2 reads a
//! single instruction; the barrier is the ownership handoff of the registry
//! between the two phase methods. Pass 3 is a read-only scan.
//!
//! Strictly sequential: one unit open at a time, no workers, no retries.

use tracing::{debug, info};

use nestscan_classfile::{ClassCorpus, ClassUnit};

use crate::errors::Result;
use crate::registry::{ClassRegistry, DescriptorBuilder};
use crate::report::{findings, Finding};
use crate::resolver::CrossReferenceResolver;

/// One full analysis run over a corpus
pub struct AnalysisPipeline {
    corpus: ClassCorpus,
}

impl AnalysisPipeline {
    pub fn new(corpus: ClassCorpus) -> Self {
        Self { corpus }
    }

    /// Run both passes and collect the sorted findings
    pub fn run(&self) -> Result<Vec<Finding>> {
        let registry = self.build_registry()?;
        let registry = self.attribute_references(registry)?;
        let report: Vec<Finding> = findings(&registry).collect();
        info!(findings = report.len(), "analysis complete");
        Ok(report)
    }

    /// Pass 1: seal one descriptor per unit
    fn build_registry(&self) -> Result<ClassRegistry> {
        let mut registry = ClassRegistry::new();
        self.corpus.for_each_unit(|path, bytes| -> Result<()> {
            let unit = ClassUnit::parse(bytes)?;
            debug!(unit = %path.display(), class = unit.identity(), "structural decode");
            let mut builder = DescriptorBuilder::new();
            unit.visit_structure(&mut |event| builder.apply(event))?;
            if let Some(descriptor) = builder.finish() {
                registry.register(descriptor);
            }
            Ok(())
        })?;
        info!(classes = registry.len(), "structural pass complete");
        Ok(registry)
    }

    /// Pass 2: attribute every instruction-level reference
    ///
    /// Takes the registry by value so no resolution can start before the
    /// structural pass has returned it complete.
    fn attribute_references(&self, mut registry: ClassRegistry) -> Result<ClassRegistry> {
        self.corpus.for_each_unit(|_path, bytes| -> Result<()> {
            let unit = ClassUnit::parse(bytes)?;
            let mut resolver = CrossReferenceResolver::for_caller(&mut registry, unit.identity())?;
            unit.visit_instructions(&mut |event| resolver.observe(event))?;
            Ok(())
        })?;
        info!("cross-reference pass complete");
        Ok(registry)
    }
}
