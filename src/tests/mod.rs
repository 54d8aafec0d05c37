#[cfg(test)]
mod quiz_generator_tests;
#[cfg(test)]
mod stats_tests;
#[cfg(test)]
mod ui_tests;
