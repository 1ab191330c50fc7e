pub mod campaign_writer;
pub mod pledge_reader;
