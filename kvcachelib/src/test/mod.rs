mod tests;
mod workload_tests;
