//! Service layer shared by front ends.

mod raffle;

pub use raffle::RaffleService;
