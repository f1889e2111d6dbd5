pub mod bed;
pub mod expression;
pub mod table;
pub use bed::PeakRecord;
pub use expression::ExpressionRecord;
pub use table::TableRecord;
