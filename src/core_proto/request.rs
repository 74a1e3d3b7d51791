/// One parsed control-channel line: the verb, uppercased, and the raw
/// argument after the first space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: String,
    pub arg: String,
}

impl Request {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.split_once(' ') {
            Some((verb, arg)) => Self {
                verb: verb.to_ascii_uppercase(),
                arg: arg.to_string(),
            },
            None => Self {
                verb: line.to_ascii_uppercase(),
                arg: String::new(),
            },
        }
    }

    pub fn has_arg(&self) -> bool {
        !self.arg.trim().is_empty()
    }
}
