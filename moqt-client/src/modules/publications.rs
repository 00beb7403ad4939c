pub(crate) mod fetch_publication;
pub(crate) mod priority;
pub(crate) mod publication;
pub(crate) mod subscribe_publication;
