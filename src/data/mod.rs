//! Dataset producers: synthetic generators and CSV loaders.

pub mod csv_io;
pub mod synthetic;

pub use csv_io::{
    load_customer_csv, load_sales_csv, read_customer_csv, read_sales_csv, CustomerDataset,
    SalesDataset,
};
pub use synthetic::{
    create_customer_data, create_sample_sales_data, create_tech_product_data, SyntheticCustomers,
    DEFAULT_SEED,
};
