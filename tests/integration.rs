//! Integration test suite entry point

mod integration {
    mod api_tests;
}
