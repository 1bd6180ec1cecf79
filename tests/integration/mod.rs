//! Integration tests for cargo-tagship

mod test_doctor;
mod test_run;
