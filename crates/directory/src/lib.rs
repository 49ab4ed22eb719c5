//! Company directory: companies, employee profiles and their login credentials.
//!
//! Pure domain rules (no IO, no storage). The lifecycle services in
//! `hrspace-infra` sequence these records and persist them.

pub mod company;
pub mod employee;
pub mod identity;
pub mod import;
pub mod user;

pub use company::Company;
pub use employee::{
    Department, Employee, EmployeeUpdate, EmploymentStatus, EmploymentType, Gender, NewEmployee,
    PersonalDetails,
};
pub use identity::{change_role, ensure_paired, login_completed};
pub use import::{ImportError, parse_batch};
pub use user::User;
