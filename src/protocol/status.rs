use std::fmt;

/// Outcome reported to the client as the first line of every response.
///
/// Codes in the `1xx` range describe a framing or server problem. All of them
/// except [`Status::InternalError`] close the connection after being sent.
/// Codes in the `2xx` range reject a single request and leave the session
/// usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// 0 OK
    Ok,
    /// 100 - a request line carried a bare line feed
    BadEol,
    /// 101 - the request could not be decoded or never terminated
    BadRequest,
    /// 199 - the server failed while executing a valid request
    InternalError,
    /// 200 - unknown command word
    InvalidCommand,
    /// 201 - wrong argument count or malformed integer argument
    InvalidArguments,
    /// 202 - no such regular file under the served directory
    FileNotFound,
    /// 203 - requested range falls outside the file
    BadOffset,
}

impl Status {
    /// Every status the server can emit, in code order.
    pub const ALL: [Status; 8] = [
        Status::Ok,
        Status::BadEol,
        Status::BadRequest,
        Status::InternalError,
        Status::InvalidCommand,
        Status::InvalidArguments,
        Status::FileNotFound,
        Status::BadOffset,
    ];

    /// Returns the numeric wire code.
    ///
    /// # Example
    ///
    /// ```
    /// # use hftpd::protocol::status::Status;
    /// assert_eq!(Status::Ok.code(), 0);
    /// assert_eq!(Status::FileNotFound.code(), 202);
    /// ```
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 0,
            Status::BadEol => 100,
            Status::BadRequest => 101,
            Status::InternalError => 199,
            Status::InvalidCommand => 200,
            Status::InvalidArguments => 201,
            Status::FileNotFound => 202,
            Status::BadOffset => 203,
        }
    }

    /// Returns the reason phrase sent after the code.
    pub fn message(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadEol => "BAD EOL",
            Status::BadRequest => "BAD REQUEST",
            Status::InternalError => "INTERNAL SERVER ERROR",
            Status::InvalidCommand => "NO SUCH COMMAND",
            Status::InvalidArguments => "INVALID ARGUMENTS FOR COMMAND",
            Status::FileNotFound => "FILE NOT FOUND",
            Status::BadOffset => "OFFSET EXCEEDS FILE SIZE",
        }
    }

    /// Looks a status up by its wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Whether the session must end once this status has been sent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Status::BadEol | Status::BadRequest)
    }
}

/// Formats the status line without the terminator, e.g. `202 FILE NOT FOUND`.
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.message())
    }
}
