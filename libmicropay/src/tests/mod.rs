mod harness;
mod unlock_tests;
