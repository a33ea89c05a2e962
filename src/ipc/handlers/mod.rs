pub mod assistant;
pub mod attendance;
pub mod core;
pub mod events;
pub mod export;
pub mod fees;
pub mod marks;
pub mod students;
