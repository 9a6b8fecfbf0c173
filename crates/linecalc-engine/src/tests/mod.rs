mod common;
mod notepad;
mod pass;
