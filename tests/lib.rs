// Integration-test-only crate; see endpoint_integration_tests.rs.
