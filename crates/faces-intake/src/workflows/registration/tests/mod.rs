mod common;
mod pipeline;
mod record;
mod validation;
