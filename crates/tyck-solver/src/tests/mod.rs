mod support;

mod kind_tests;
mod overload_tests;
mod printer_tests;
mod relation_tests;
