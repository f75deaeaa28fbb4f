pub mod health_queries;
