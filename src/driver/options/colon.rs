//! Colon-dialect options (`/name[:value]`, `-name[+|-]`)
//!
//! Names are case-insensitive. Toggle entries also match `name+` and `name-`.

use log::debug;

use crate::driver::resources::parse_resource_spec;
use crate::lang_options::{LanguageVersion, TextEncoding};

use super::legacy::set_target;
use super::{is_valid_symbol, ArgumentError, InfoRequest, OptionParser};

/// One matched colon option
pub(crate) struct ColonArg<'s> {
    /// The option as written, without its value (`/out`, `/debug+`)
    pub option: &'s str,
    /// Text after the first `:`, empty when absent
    pub value: &'s str,
    /// `false` for a trailing `-`
    pub enabled: bool,
}

impl ColonArg<'_> {
    fn required(&self) -> Result<&str, ArgumentError> {
        self.required_with_code(5)
    }

    fn required_with_code(&self, code: i32) -> Result<&str, ArgumentError> {
        if self.value.is_empty() {
            return Err(ArgumentError::MissingArgument {
                option: self.option.to_string(),
                code,
            });
        }
        Ok(self.value)
    }
}

/// An argument split into option and value
pub(crate) struct SplitArg<'s> {
    pub option: &'s str,
    pub value: &'s str,
    /// Lowercased name without the leading `/`
    pub name: String,
}

pub(crate) fn split(arg: &str) -> SplitArg<'_> {
    let (option, value) = arg.split_once(':').unwrap_or((arg, ""));
    let name = option.strip_prefix('/').unwrap_or(option).to_lowercase();
    SplitArg { option, value, name }
}

type Handler = fn(&mut OptionParser<'_>, &ColonArg<'_>) -> Result<(), ArgumentError>;

pub(crate) struct ColonOption {
    pub names: &'static [&'static str],
    pub toggle: bool,
    pub handler: Handler,
}

const fn exact(names: &'static [&'static str], handler: Handler) -> ColonOption {
    ColonOption {
        names,
        toggle: false,
        handler,
    }
}

const fn toggle(names: &'static [&'static str], handler: Handler) -> ColonOption {
    ColonOption {
        names,
        toggle: true,
        handler,
    }
}

static OPTIONS: &[ColonOption] = &[
    exact(&["nologo", "fullpaths"], |_, _| Ok(())),
    toggle(&["incremental"], |_, _| Ok(())),
    exact(&["bugreport"], |_, _| {
        println!("To file bug reports, please visit the project issue tracker");
        Ok(())
    }),
    exact(&["target", "t"], |p, a| {
        set_target(p, a.value);
        Ok(())
    }),
    exact(&["out"], |p, a| {
        p.config.output_path = Some(a.required()?.into());
        Ok(())
    }),
    toggle(&["optimize", "o"], |p, a| {
        p.config.optimize = a.enabled;
        Ok(())
    }),
    exact(&["define", "d"], |p, a| {
        for symbol in a.required()?.split([';', ',']) {
            if is_valid_symbol(symbol) {
                p.config.defines.insert(symbol.to_string());
            } else {
                p.diagnostics
                    .report_warning(2029, 1, format!("Invalid conditional define symbol `{}'", symbol));
            }
        }
        Ok(())
    }),
    exact(&["pkg"], |p, a| {
        let packages = a.required()?.to_string();
        p.expand_packages(&packages)
    }),
    exact(&["linkres", "linkresource", "res", "resource"], |p, a| {
        let embedded = a.option.get(1..2).is_some_and(|c| c.eq_ignore_ascii_case("r"));
        let value = a.required()?;
        if let Some((file, name, private)) = parse_resource_spec(a.option, value, p.diagnostics) {
            p.config.resources.add(embedded, &file, &name, private, p.diagnostics);
        }
        Ok(())
    }),
    exact(&["recurse"], |p, a| {
        let pattern = a.required()?;
        p.config.sources.process(pattern, true, p.diagnostics);
        Ok(())
    }),
    exact(&["reference", "r"], |p, a| {
        for entry in a.required()?.split([';', ',']).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((alias, name)) => {
                    p.config.references.add_extern_alias(alias, name, p.diagnostics);
                }
                None => p.config.references.add_reference(entry),
            }
        }
        Ok(())
    }),
    exact(&["addmodule"], |p, a| {
        let modules = a.required()?.split([';', ',']).filter(|m| !m.is_empty());
        p.config.modules.extend(modules.map(str::to_string));
        Ok(())
    }),
    exact(&["win32res"], |p, a| {
        p.config.win32_resource = Some(a.required()?.into());
        Ok(())
    }),
    exact(&["win32icon"], |p, a| {
        p.config.win32_icon = Some(a.required()?.into());
        Ok(())
    }),
    exact(&["doc"], |p, a| {
        p.config.doc_output = Some(a.required_with_code(2006)?.into());
        Ok(())
    }),
    exact(&["lib"], |p, a| {
        let dirs = a.required()?.split([',', ';']).filter(|d| !d.is_empty());
        p.config.link_paths.extend(dirs.map(Into::into));
        Ok(())
    }),
    toggle(&["debug"], |p, a| {
        p.config.debug_info = a.enabled;
        Ok(())
    }),
    toggle(&["checked"], |p, a| {
        p.config.checked = a.enabled;
        Ok(())
    }),
    toggle(&["clscheck"], |p, a| {
        p.config.verify_cls_compliance = a.enabled;
        Ok(())
    }),
    toggle(&["unsafe"], |p, a| {
        p.config.unsafe_code = a.enabled;
        Ok(())
    }),
    toggle(&["warnaserror"], |p, a| {
        p.diagnostics.options.warnings_as_errors = a.enabled;
        Ok(())
    }),
    exact(&["warn", "w"], |p, a| {
        let level = a.required()?.to_string();
        p.set_warning_level(&level);
        Ok(())
    }),
    exact(&["nowarn"], |p, a| {
        let ids = a.required()?.to_string();
        p.ignore_warnings(&ids);
        Ok(())
    }),
    toggle(&["noconfig"], |p, a| {
        p.config.load_default_config = !a.enabled;
        Ok(())
    }),
    exact(&["help2"], |p, _| {
        p.request_info(InfoRequest::Help2);
        Ok(())
    }),
    exact(&["help", "?"], |p, _| {
        p.request_info(InfoRequest::Help);
        Ok(())
    }),
    exact(&["main", "m"], |p, a| {
        p.config.main_class = Some(a.required()?.to_string());
        Ok(())
    }),
    toggle(&["nostdlib"], |p, a| {
        p.config.stdlib = !a.enabled;
        Ok(())
    }),
    exact(&["keyfile"], |p, a| {
        p.config.signing.key_file = Some(a.required()?.into());
        Ok(())
    }),
    exact(&["keycontainer"], |p, a| {
        p.config.signing.key_container = Some(a.required()?.to_string());
        Ok(())
    }),
    toggle(&["delaysign"], |p, a| {
        p.config.signing.delay_sign = a.enabled;
        Ok(())
    }),
    exact(&["langversion"], |p, a| {
        match LanguageVersion::parse(a.value) {
            Some(version) => p.config.lang_version = version,
            None => p.diagnostics.report_error(
                1617,
                format!(
                    "Invalid option `{}' for /langversion. It must be either `ISO-1', `ISO-2', `Default' or `LINQ'",
                    a.value
                ),
            ),
        }
        Ok(())
    }),
    exact(&["codepage"], |p, a| {
        let value = a.value;
        let encoding = match value.to_lowercase().as_str() {
            "utf8" => Some(TextEncoding::Utf8),
            "reset" => Some(TextEncoding::Default),
            other => other.parse().ok().and_then(TextEncoding::from_code_page),
        };
        match encoding {
            Some(encoding) => {
                debug!("source encoding {:?}", encoding);
                p.config.encoding = encoding;
            }
            None => p
                .diagnostics
                .report_error(2016, format!("Code page `{}' is invalid or not installed", value)),
        }
        Ok(())
    }),
];

/// Find the entry for a lowercased name. The flag is the toggle state.
pub(crate) fn lookup(name: &str) -> Option<(&'static ColonOption, bool)> {
    let (bare, enabled) = match name.strip_suffix('+') {
        Some(bare) => (bare, true),
        None => match name.strip_suffix('-') {
            Some(bare) => (bare, false),
            None => (name, true),
        },
    };

    OPTIONS.iter().find_map(|option| {
        if option.toggle && option.names.contains(&bare) {
            Some((option, enabled))
        } else if option.names.contains(&name) {
            Some((option, true))
        } else {
            None
        }
    })
}
