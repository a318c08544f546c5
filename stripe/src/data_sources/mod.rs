//! Data source implementations

pub mod balance;

pub use balance::BalanceDataSource;

use tfplug::DataSourceFactory;

pub fn balance_factory() -> DataSourceFactory {
    Box::new(|| Box::new(BalanceDataSource::default()))
}
