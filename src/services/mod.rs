pub mod aggregator;
pub mod candidate_pool;
pub mod credentials;
pub mod finalizer;
pub mod genres;
pub mod providers;
pub mod recommendations;
pub mod seed_resolver;

#[cfg(test)]
pub(crate) mod test_support;
