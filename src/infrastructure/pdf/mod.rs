mod wkhtmltopdf_generator;

pub use wkhtmltopdf_generator::WkHtmlToPdfGenerator;
