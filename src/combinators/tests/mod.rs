mod helpers;

mod settle_all_tests;
