use clap::{Arg, Command};

pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_BACKEND_TIMEOUT: &str = "backend-timeout";
pub const ARG_REQUEST_DEADLINE: &str = "request-deadline";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND_URL)
                .short('b')
                .long(ARG_BACKEND_URL)
                .help("Upstream backend base URL, example: http://backend.tld:5007")
                .env("STUDENT_GATEWAY_BACKEND_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_BACKEND_TIMEOUT)
                .long(ARG_BACKEND_TIMEOUT)
                .help("Timeout for each upstream call, in seconds")
                .env("STUDENT_GATEWAY_BACKEND_TIMEOUT")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REQUEST_DEADLINE)
                .long(ARG_REQUEST_DEADLINE)
                .help("Deadline for a whole login, fetch or report operation, in seconds")
                .env("STUDENT_GATEWAY_REQUEST_DEADLINE")
                .default_value("20")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
