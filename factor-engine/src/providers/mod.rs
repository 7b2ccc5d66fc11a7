// Built-in factor providers

mod bollinger;
mod ma_crossover;
mod rsi;
mod sentiment;

pub use bollinger::BollingerPctB;
pub use ma_crossover::MaCrossover;
pub use rsi::Rsi;
pub use sentiment::FearGreed;
