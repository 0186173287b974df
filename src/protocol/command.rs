use crate::error::CommandError;

/// Command words understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Quit,
    GetFileListing,
    GetMetadata,
    GetSlice,
}

/// A validated request, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Quit,
    GetFileListing,
    GetMetadata {
        filename: String,
    },
    GetSlice {
        filename: String,
        offset: i64,
        size: i64,
    },
}

impl CommandName {
    /// Matches a command word, ignoring ASCII case.
    ///
    /// # Example
    ///
    /// ```
    /// # use hftpd::protocol::command::CommandName;
    /// assert_eq!(CommandName::parse("GET_SLICE"), Some(CommandName::GetSlice));
    /// assert_eq!(CommandName::parse("Quit"), Some(CommandName::Quit));
    /// assert_eq!(CommandName::parse("delete"), None);
    /// ```
    pub fn parse(word: &str) -> Option<Self> {
        [
            CommandName::Quit,
            CommandName::GetFileListing,
            CommandName::GetMetadata,
            CommandName::GetSlice,
        ]
        .into_iter()
        .find(|name| name.as_str().eq_ignore_ascii_case(word))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Quit => "quit",
            CommandName::GetFileListing => "get_file_listing",
            CommandName::GetMetadata => "get_metadata",
            CommandName::GetSlice => "get_slice",
        }
    }

    /// Number of arguments the command takes.
    pub fn arity(&self) -> usize {
        match self {
            CommandName::Quit | CommandName::GetFileListing => 0,
            CommandName::GetMetadata => 1,
            CommandName::GetSlice => 3,
        }
    }
}

impl Request {
    /// Parses a trimmed request line.
    ///
    /// Tokens are separated by single spaces, so two consecutive spaces
    /// produce an empty argument and count towards the arity.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = line.split(' ').collect();
        let (word, args) = tokens
            .split_first()
            .ok_or_else(|| CommandError::Unknown(String::new()))?;

        let name = CommandName::parse(word).ok_or_else(|| CommandError::Unknown(word.to_string()))?;

        if args.len() != name.arity() {
            return Err(CommandError::Arity {
                command: name.as_str(),
                expected: name.arity(),
                got: args.len(),
            });
        }

        let request = match (name, args) {
            (CommandName::Quit, _) => Request::Quit,
            (CommandName::GetFileListing, _) => Request::GetFileListing,
            (CommandName::GetMetadata, [filename]) => Request::GetMetadata {
                filename: filename.to_string(),
            },
            (CommandName::GetSlice, [filename, offset, size]) => Request::GetSlice {
                filename: filename.to_string(),
                offset: parse_integer(offset)?,
                size: parse_integer(size)?,
            },
            (name, args) => {
                return Err(CommandError::Arity {
                    command: name.as_str(),
                    expected: name.arity(),
                    got: args.len(),
                });
            }
        };

        Ok(request)
    }

    pub fn name(&self) -> CommandName {
        match self {
            Request::Quit => CommandName::Quit,
            Request::GetFileListing => CommandName::GetFileListing,
            Request::GetMetadata { .. } => CommandName::GetMetadata,
            Request::GetSlice { .. } => CommandName::GetSlice,
        }
    }
}

fn parse_integer(token: &str) -> Result<i64, CommandError> {
    token
        .parse::<i64>()
        .map_err(|_| CommandError::NotAnInteger(token.to_string()))
}
