// Rules module - derives a monetary rule from free-text offer terms
// - terms.rs: term kinds and their precedence
// - parser.rs: RuleParser, compiled once from config and reused per description

pub mod terms;
pub mod parser;

pub use parser::RuleParser;
pub use terms::TermKind;
