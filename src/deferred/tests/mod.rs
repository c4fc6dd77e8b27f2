mod helpers;

mod chain_tests;
