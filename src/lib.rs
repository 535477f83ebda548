pub mod assemble;
pub mod config;
pub mod etl;
pub mod fetch;
pub mod load;
pub mod schema;

#[cfg(test)]
mod test_util;
