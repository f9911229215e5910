//! Legacy option spellings (`--foo VALUE`, `-r NAME`)
//!
//! Matched by exact spelling. Most entries are deprecated aliases of a colon
//! option and warn -29 at level 1 when used.

use crate::driver::cli::Target;

use super::{ArgumentError, InfoRequest, OptionParser};

type Handler = fn(&mut OptionParser<'_>, &str, Option<String>) -> Result<(), ArgumentError>;

pub(crate) struct LegacyOption {
    pub names: &'static [&'static str],
    /// Replacement suggested in the deprecation warning
    pub deprecated: Option<&'static str>,
    /// Consumes the following argument
    pub takes_value: bool,
    pub handler: Handler,
}

impl LegacyOption {
    pub(crate) fn missing_value(&self, arg: &str) -> ArgumentError {
        if self.names.contains(&"--wlevel") {
            ArgumentError::MissingArgument {
                option: arg.to_string(),
                code: 1900,
            }
        } else {
            ArgumentError::missing(arg)
        }
    }
}

const fn flag(names: &'static [&'static str], deprecated: Option<&'static str>, handler: Handler) -> LegacyOption {
    LegacyOption {
        names,
        deprecated,
        takes_value: false,
        handler,
    }
}

const fn valued(names: &'static [&'static str], deprecated: Option<&'static str>, handler: Handler) -> LegacyOption {
    LegacyOption {
        names,
        deprecated,
        takes_value: true,
        handler,
    }
}

static OPTIONS: &[LegacyOption] = &[
    flag(&["-v"], None, |p, _, _| {
        p.config.parser_verbosity += 1;
        Ok(())
    }),
    flag(&["--version"], None, |p, _, _| {
        p.request_info(InfoRequest::Version);
        Ok(())
    }),
    flag(&["--parse"], None, |p, _, _| {
        p.config.parse_only = true;
        Ok(())
    }),
    valued(&["--main", "-m"], Some("-main:CLASS"), |p, _, value| {
        p.config.main_class = value;
        Ok(())
    }),
    flag(&["--unsafe"], Some("-unsafe"), |p, _, _| {
        p.config.unsafe_code = true;
        Ok(())
    }),
    flag(&["--help"], None, |p, _, _| {
        p.request_info(InfoRequest::Help);
        Ok(())
    }),
    valued(&["--define"], Some("-d:NAME"), |p, _, value| {
        if let Some(name) = value {
            p.config.defines.insert(name);
        }
        Ok(())
    }),
    flag(&["--tokenize"], None, |p, _, _| {
        p.config.tokenize_only = true;
        Ok(())
    }),
    valued(&["-o", "--output"], Some("-out:FILE"), |p, _, value| {
        p.config.output_path = value.map(Into::into);
        Ok(())
    }),
    flag(&["--checked"], Some("-checked"), |p, _, _| {
        p.config.checked = true;
        Ok(())
    }),
    flag(&["--fatal"], None, |p, _, _| {
        p.diagnostics.options.fatal = true;
        Ok(())
    }),
    flag(&["--stacktrace"], None, |p, _, _| {
        p.config.stack_trace = true;
        Ok(())
    }),
    valued(&["--linkresource", "--linkres"], Some("-linkres:VALUE"), |p, _, value| {
        if let Some(file) = value {
            p.config.resources.add(false, &file, &file, false, p.diagnostics);
        }
        Ok(())
    }),
    valued(&["--resource", "--res"], Some("-res:VALUE"), |p, _, value| {
        if let Some(file) = value {
            p.config.resources.add(true, &file, &file, false, p.diagnostics);
        }
        Ok(())
    }),
    valued(&["--target"], Some("-target:KIND"), |p, _, value| {
        let value = value.unwrap_or_default();
        set_target(p, &value);
        Ok(())
    }),
    valued(&["-r"], Some("-r:REFERENCE"), |p, _, value| {
        if let Some(reference) = value {
            match reference.split_once('=') {
                Some((alias, name)) => {
                    p.config.references.add_extern_alias(alias, name, p.diagnostics);
                }
                None => p.config.references.add_reference(&reference),
            }
        }
        Ok(())
    }),
    valued(&["-L"], Some("-lib:PATH"), |p, _, value| {
        if let Some(dir) = value {
            p.config.link_paths.push(dir.into());
        }
        Ok(())
    }),
    flag(&["--nostdlib"], Some("-nostdlib"), |p, _, _| {
        p.config.stdlib = false;
        Ok(())
    }),
    flag(&["--werror"], Some("-warnaserror"), |p, _, _| {
        p.diagnostics.options.warnings_as_errors = true;
        Ok(())
    }),
    valued(&["--nowarn"], Some("-nowarn:NUMBER"), |p, arg, value| {
        let value = value.unwrap_or_default();
        match value.parse::<i32>() {
            Ok(code) if code >= 1 => {
                p.diagnostics.options.ignored_warnings.insert(code);
                Ok(())
            }
            _ => Err(ArgumentError::InvalidValue {
                option: arg.to_string(),
                value,
            }),
        }
    }),
    valued(&["--wlevel"], Some("-warn:LEVEL"), |p, _, value| {
        p.set_warning_level(&value.unwrap_or_default());
        Ok(())
    }),
    valued(&["--mcs-debug"], None, |p, arg, value| {
        let value = value.unwrap_or_default();
        p.config.debug_level = value.parse().map_err(|_| ArgumentError::InvalidValue {
            option: arg.to_string(),
            value: value.clone(),
        })?;
        Ok(())
    }),
    flag(&["--about"], None, |p, _, _| {
        p.request_info(InfoRequest::About);
        Ok(())
    }),
    valued(&["--recurse"], Some("-recurse:PATTERN"), |p, _, value| {
        if let Some(pattern) = value {
            p.config.sources.process(&pattern, true, p.diagnostics);
        }
        Ok(())
    }),
    flag(&["--timestamp"], None, |p, _, _| {
        p.config.timestamps = true;
        Ok(())
    }),
    flag(&["--debug", "-g"], Some("-debug"), |p, _, _| {
        p.config.debug_info = true;
        Ok(())
    }),
    flag(&["--noconfig"], Some("-noconfig"), |p, _, _| {
        p.config.load_default_config = false;
        Ok(())
    }),
    valued(&["--expect-error"], None, |p, arg, value| {
        let value = value.unwrap_or_default();
        let code = value.parse().map_err(|_| ArgumentError::InvalidValue {
            option: arg.to_string(),
            value: value.clone(),
        })?;
        p.diagnostics.options.expected_error = Some(code);
        Ok(())
    }),
];

pub(crate) fn lookup(arg: &str) -> Option<&'static LegacyOption> {
    OPTIONS.iter().find(|option| option.names.contains(&arg))
}

/// Shared by `--target` and `-target:`
pub(crate) fn set_target(p: &mut OptionParser<'_>, value: &str) {
    match Target::parse(value) {
        Some(target) => p.config.target = target,
        None => p.diagnostics.report_error(
            2019,
            format!(
                "Invalid target type for -target. Valid options are {}",
                Target::valid_values()
            ),
        ),
    }
}
