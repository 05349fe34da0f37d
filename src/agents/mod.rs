//! Agent 层：Doctor（采集与判断）、Supervisor（审核）、Counselor（解释与答疑）

pub mod counselor;
pub mod doctor;
pub mod prompts;
pub mod reply;
pub mod supervisor;

pub use counselor::{Counselor, CounselorResult};
pub use doctor::{DecisionKind, Doctor, DoctorDecision};
pub use supervisor::{ReviewInput, ReviewRole, Supervisor, SupervisorVerdict};
