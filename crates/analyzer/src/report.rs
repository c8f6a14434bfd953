//! What `ContractAnalyzer::analyze` hands back (§4.G, §7): the meta document
//! bundled with every recoverable diagnostic collected along the way, so a
//! budget overrun or a malformed function never turns into a silent empty
//! document.

use crate::error::Diagnostic;
use crate::meta::MetaDocument;

#[derive(Clone, Debug, Default)]
pub struct AnalyzerReport {
    pub document: MetaDocument,
    pub diagnostics: Vec<Diagnostic>,
}
