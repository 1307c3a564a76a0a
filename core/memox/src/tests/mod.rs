mod fakes;
mod run_app_tests;
mod users_tests;
