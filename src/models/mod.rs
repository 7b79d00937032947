pub mod payload;
pub mod turn;
pub mod voice;
