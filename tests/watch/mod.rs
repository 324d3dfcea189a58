//! Watch client tests.

mod source_test;
