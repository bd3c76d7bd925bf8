//! Random variates, service times and the workforce
//!
//! # Overview
//!
//! - **Distribution**: parametric random-variate families sampled from `rand`
//! - **ServiceTimeTable**: per-operation distributions for trained staff and trainees
//! - **Workforce / ResourcePool**: servers with seize/release bookkeeping and the
//!   ordered member lists stations scan for an idle server
//!
//! # Usage Example
//!
//! ```rust
//! use docflow_sim::resources::*;
//! use docflow_sim::types::StaffingConfig;
//!
//! let mut workforce = Workforce::from_staffing(&StaffingConfig::default());
//! let pool = ResourcePool::new(workforce.members(Role::Coding));
//! let coder = pool.first_idle(&workforce).unwrap();
//! workforce.seize(coder).unwrap();
//! assert_eq!(pool.busy(&workforce), 1);
//! ```

pub mod distribution;
pub mod pool;
pub mod service_times;

pub use distribution::*;
pub use pool::*;
pub use service_times::*;
