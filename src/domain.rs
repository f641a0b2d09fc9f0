pub mod clock;
pub mod day;
pub mod record;
pub mod reward;
pub mod summary;
