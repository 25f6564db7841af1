mod cli;
mod process_backend;
mod repunit_cliff;
mod scenarios;
mod scheduler;
