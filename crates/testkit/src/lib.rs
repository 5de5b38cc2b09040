mod fake_backend;
mod yaml_runner;

pub use fake_backend::{
    BEGIN_SQL, COMMIT_SQL, FakeBackend, FakeConnection, FakeManager, ROLLBACK_SQL,
};
pub use yaml_runner::{
    RunnerError, TestCase, TestCaseFile, TestResult, load_test_cases_from_dir,
    load_test_cases_from_str, matches_dialect, run_offline_test,
};
