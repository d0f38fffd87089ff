mod materialize_tests;
mod plan_tests;
