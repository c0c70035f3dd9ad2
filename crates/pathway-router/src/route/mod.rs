/// Route pathname analysis
///
/// - `pattern` classifies single pathname segments
/// - `parser` scores and orders whole pathnames by specificity

pub mod parser;
pub mod pattern;
