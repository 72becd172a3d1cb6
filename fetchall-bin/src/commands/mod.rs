pub(crate) mod fetch;

pub(crate) use fetch::fetch;

use crate::formatters::response::ResponseFormatter;
use crate::input::InputSource;
use crate::options::Config;

/// Parameters passed to every command
pub(crate) struct CommandParams {
    pub(crate) client: reqwest::Client,
    pub(crate) inputs: Vec<InputSource>,
    pub(crate) formatter: Box<dyn ResponseFormatter>,
    pub(crate) cfg: Config,
}
