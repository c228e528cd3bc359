pub mod account_ops;
pub mod task_ops;
