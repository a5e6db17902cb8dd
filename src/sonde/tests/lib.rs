mod common;

mod cli;
