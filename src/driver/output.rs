//! Informational output and phase timing

use std::time::Instant;

use super::cli::Target;
use super::options::InfoRequest;

/// Handler for the informational flags
pub(crate) struct OutputHandler;

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler {
    pub(crate) fn new() -> Self {
        OutputHandler
    }

    pub(crate) fn print_info(&self, request: InfoRequest) {
        let text = match request {
            InfoRequest::Help => usage(),
            InfoRequest::Help2 => other_flags(),
            InfoRequest::About => about(),
            InfoRequest::Version => version(),
        };
        println!("{}", text);
    }
}

pub(crate) fn version() -> String {
    format!("sharpc compiler version {}", env!("CARGO_PKG_VERSION"))
}

pub(crate) fn about() -> String {
    format!(
        "{}\n\nA batch compiler driver: option parsing, reference resolution\nand the staged compilation pipeline.",
        version()
    )
}

pub(crate) fn usage() -> String {
    let lines = [
        "sharpc compiler, (C) the sharpc authors".to_string(),
        "sharpc [options] source-files".to_string(),
        "   --about              About the compiler".to_string(),
        "   -addmodule:M1[,Mn]   Adds the module to the generated assembly".to_string(),
        "   -checked[+|-]        Sets default arithmetic overflow context".to_string(),
        "   -codepage:ID         Sets code page to the one in ID (number, utf8, reset)".to_string(),
        "   -clscheck[+|-]       Disables CLS Compliance verifications".to_string(),
        "   -define:S1[;S2]      Defines one or more conditional symbols (short: -d)".to_string(),
        "   -debug[+|-], -g      Generate debugging information".to_string(),
        "   -delaysign[+|-]      Only insert the public key into the assembly (no signing)".to_string(),
        "   -doc:FILE            Process documentation comments to XML file".to_string(),
        "   -help                Lists all compiler options (short: -?)".to_string(),
        "   -keycontainer:NAME   The key pair container used to sign the output assembly".to_string(),
        "   -keyfile:FILE        The key file used to strongname the output assembly".to_string(),
        "   -langversion:TEXT    Specifies language version modes: ISO-1, ISO-2, Default or LINQ".to_string(),
        "   -lib:PATH1[,PATHn]   Specifies the location of referenced assemblies".to_string(),
        "   -main:CLASS          Specifies the class with the Main method (short: -m)".to_string(),
        "   -noconfig            Disables implicitly referenced assemblies".to_string(),
        "   -nostdlib[+|-]       Does not reference mscorlib.dll library".to_string(),
        "   -nowarn:W1[,Wn]      Suppress one or more compiler warnings".to_string(),
        "   -optimize[+|-]       Enables advanced compiler optimizations (short: -o)".to_string(),
        "   -out:FILE            Specifies output assembly name".to_string(),
        "   -pkg:P1[,Pn]         References packages P1..Pn".to_string(),
        "   -recurse:SPEC        Recursively compiles files according to SPEC pattern".to_string(),
        "   -reference:A1[,An]   Imports metadata from the specified assembly (short: -r)".to_string(),
        "   -reference:ALIAS=A   Imports metadata using specified extern alias (short: -r)".to_string(),
        format!(
            "   -target:KIND         Specifies the format of the output assembly (short: -t)\n                        KIND can be one of: {}",
            Target::valid_values()
        ),
        "   -unsafe[+|-]         Allows to compile code which uses unsafe keyword".to_string(),
        "   -warnaserror[+|-]    Treats all warnings as errors".to_string(),
        "   -warn:0-4            Sets warning level, the default is 4 (short -w:)".to_string(),
        "   -help2               Shows internal compiler options".to_string(),
        String::new(),
        "Resources:".to_string(),
        "   -linkresource:FILE[,ID] Links FILE as a resource (short: -linkres)".to_string(),
        "   -resource:FILE[,ID]     Embed FILE as a resource (short: -res)".to_string(),
        "   -win32res:FILE          Specifies Win32 resource file (.res)".to_string(),
        "   -win32icon:FILE         Use this icon for the output".to_string(),
        "   @file                   Read response file for more options".to_string(),
        String::new(),
        "Options can be of the form -option or /option".to_string(),
    ];
    lines.join("\n")
}

pub(crate) fn other_flags() -> String {
    [
        "Other flags in the compiler",
        "   --fatal            Makes errors fatal",
        "   --parse            Only parses the source file",
        "   --stacktrace       Shows stack trace at error location",
        "   --timestamp        Displays time stamps of various compiler events",
        "   --expect-error X   Expect that error X will be encountered",
        "   -v                 Verbose parsing (for debugging the parser)",
        "   --mcs-debug X      Sets the debug log level to X (1-3)",
    ]
    .join("\n")
}

/// `--timestamp` lap timer
pub(crate) struct Timer {
    enabled: bool,
    first: Instant,
    last: Instant,
}

impl Timer {
    pub(crate) fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Timer {
            enabled,
            first: now,
            last: now,
        }
    }

    /// Print the time since the previous lap
    pub(crate) fn show_time(&mut self, message: &str) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        println!("{}", format_lap(now.duration_since(self.last), message));
        self.last = now;
    }

    /// Print the time since the timer started
    pub(crate) fn show_total_time(&mut self, message: &str) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        println!("{}", format_lap(now.duration_since(self.first), message));
        self.last = now;
    }
}

/// `[SS:mmm] message`
pub(crate) fn format_lap(elapsed: std::time::Duration, message: &str) -> String {
    format!("[{:02}:{:03}] {}", elapsed.as_secs(), elapsed.subsec_millis(), message)
}
