pub mod web_scraping;
