pub mod decision_writer;
