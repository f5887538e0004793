pub mod cli;
pub mod config;
pub mod contract;
pub mod controller;
pub mod logging;
pub mod model;
pub mod partition_source;
pub mod record_store;
pub mod routing;
pub mod runtime;
pub mod search;
pub mod suggestions;
pub mod transport;

#[cfg(test)]
mod tests {
    mod query_latency_test {
        include!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/perf/query_latency_test.rs"
        ));
    }
}
