mod common;

mod data_tests;
mod settings_tests;
mod sync_tests;
