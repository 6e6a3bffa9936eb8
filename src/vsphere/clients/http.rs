use crate::vsphere::*;
use anyhow::{anyhow, Context};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const SESSION_HEADER: &str = "vmware-api-session-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct VsphereConnectOptions<'a> {
    pub server: &'a str,
    pub user: &'a str,
    pub password: &'a str,
    pub release: &'a str,
    pub verify_certs: bool,
}

/// Client for the vSphere VI/JSON API (`https://<server>/sdk/vim25/<release>`).
///
/// The session opened by [`Self::connect()`] is closed by
/// [`Self::disconnect()`] or, failing that, when the client gets dropped.
pub struct VsphereHttpClient {
    endpoint: Endpoint,
    content: ServiceContent,
    session: Option<String>,
}

impl VsphereHttpClient {
    pub fn connect(options: &VsphereConnectOptions<'_>) -> VsphereResult<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(!options.verify_certs)
            .danger_accept_invalid_hostnames(!options.verify_certs)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Couldn't build the HTTP client")?;

        let endpoint = Endpoint {
            http,
            base: base_url(options.server, options.release)?,
        };

        // Retrieving the service content doesn't require a session
        let url = endpoint.url(&["ServiceInstance", "ServiceInstance", "content"])?;

        tracing::debug!(%url, "fetching service content");

        let content: ServiceContent = parse(send(endpoint.http.get(url))?)
            .context("Couldn't retrieve the service content")?;

        let mut this = Self {
            endpoint,
            content,
            session: None,
        };

        this.login(options.user, options.password)?;

        Ok(this)
    }

    /// Closes the session; calling it more than once is a no-op.
    pub fn disconnect(&mut self) -> VsphereResult<()> {
        let session = if let Some(session) = self.session.take() {
            session
        } else {
            return Ok(());
        };

        let url = self.endpoint.url(&[
            "SessionManager",
            &self.content.session_manager.value,
            "Logout",
        ])?;

        tracing::debug!(%url, "logging out");

        send(self.endpoint.http.post(url).header(SESSION_HEADER, session))?;

        Ok(())
    }

    fn login(&mut self, user: &str, password: &str) -> VsphereResult<()> {
        let url = self.endpoint.url(&[
            "SessionManager",
            &self.content.session_manager.value,
            "Login",
        ])?;

        tracing::debug!(%url, user, "logging in");

        let request = self.endpoint.http.post(url).json(&json!({
            "userName": user,
            "password": password,
        }));

        let response = match send(request) {
            Ok(response) => response,

            Err(VsphereError::Api { status, message })
                if status == 401 || message.starts_with("InvalidLogin") =>
            {
                return Err(VsphereError::InvalidCredentials);
            }

            Err(err) => return Err(err),
        };

        let session = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|session| session.to_str().ok())
            .ok_or_else(|| anyhow!("Endpoint didn't return any session id"))?;

        self.session = Some(session.to_owned());

        Ok(())
    }

    fn session(&self) -> VsphereResult<&str> {
        self.session.as_deref().ok_or(VsphereError::NotConnected)
    }

    fn get<T>(&self, segments: &[&str]) -> VsphereResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint.url(segments)?;

        tracing::debug!(%url, "GET");

        let request = self
            .endpoint
            .http
            .get(url)
            .header(SESSION_HEADER, self.session()?);

        parse(send(request)?)
    }

    fn invoke<T>(&self, segments: &[&str], body: &Value) -> VsphereResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint.url(segments)?;

        tracing::debug!(%url, "POST");
        tracing::trace!(%body, "request body");

        let request = self
            .endpoint
            .http
            .post(url)
            .header(SESSION_HEADER, self.session()?)
            .json(body);

        parse(send(request)?)
    }

    fn list_view(&self, view: &MoRef) -> VsphereResult<Vec<VsphereVm>> {
        let objects: Vec<MoRef> = self.get(&["ContainerView", &view.value, "view"])?;

        objects
            .into_iter()
            .filter(|object| object.kind == "VirtualMachine")
            .map(|object| {
                let name = self.get(&["VirtualMachine", &object.value, "name"])?;

                Ok(VsphereVm {
                    id: VsphereVmId::new(&object.value),
                    name,
                })
            })
            .collect()
    }

    fn destroy_view(&self, view: &MoRef) -> VsphereResult<()> {
        self.invoke(&["ContainerView", &view.value, "DestroyView"], &json!({}))
    }
}

impl VsphereClient for VsphereHttpClient {
    fn vms(&mut self) -> VsphereResult<Vec<VsphereVm>> {
        let view: MoRef = self.invoke(
            &[
                "ViewManager",
                &self.content.view_manager.value,
                "CreateContainerView",
            ],
            &json!({
                "container": self.content.root_folder,
                "type": ["VirtualMachine"],
                "recursive": true,
            }),
        )?;

        let vms = self.list_view(&view);

        // Views live on the server until destroyed, so this has to happen
        // even if listing failed
        if let Err(err) = self.destroy_view(&view) {
            tracing::warn!(view = %view.value, "Couldn't destroy container view: {}", err);
        }

        vms
    }

    fn rename_vm(
        &mut self,
        vm: &VsphereVmId,
        name: &VsphereVmName,
    ) -> VsphereResult<VsphereTaskId> {
        let task: MoRef = self.invoke(
            &["VirtualMachine", vm.as_str(), "Rename_Task"],
            &json!({ "newName": name.as_str() }),
        )?;

        Ok(VsphereTaskId::new(task.value))
    }

    fn snapshot_info(&mut self, vm: &VsphereVmId) -> VsphereResult<Option<VsphereSnapshotInfo>> {
        self.get(&["VirtualMachine", vm.as_str(), "snapshot"])
    }

    fn remove_all_snapshots(&mut self, vm: &VsphereVmId) -> VsphereResult<VsphereTaskId> {
        let task: MoRef = self.invoke(
            &["VirtualMachine", vm.as_str(), "RemoveAllSnapshots_Task"],
            &json!({}),
        )?;

        Ok(VsphereTaskId::new(task.value))
    }

    fn devices(&mut self, vm: &VsphereVmId) -> VsphereResult<Vec<VsphereDevice>> {
        let config: Option<VmConfigInfo> = self.get(&["VirtualMachine", vm.as_str(), "config"])?;

        config
            .map(|config| config.hardware.device)
            .ok_or_else(|| {
                VsphereError::Other(anyhow!(
                    "Virtual machine has no configuration (is it inaccessible?): {}",
                    vm
                ))
            })
    }

    fn reconfigure_vm(
        &mut self,
        vm: &VsphereVmId,
        spec: &VsphereConfigSpec,
    ) -> VsphereResult<VsphereTaskId> {
        let task: MoRef = self.invoke(
            &["VirtualMachine", vm.as_str(), "ReconfigVM_Task"],
            &json!({ "spec": spec }),
        )?;

        Ok(VsphereTaskId::new(task.value))
    }

    fn task_info(&mut self, task: &VsphereTaskId) -> VsphereResult<VsphereTaskInfo> {
        self.get(&["Task", task.as_str(), "info"])
    }
}

impl Drop for VsphereHttpClient {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            tracing::warn!("Couldn't close the session: {}", err);
        }
    }
}

struct Endpoint {
    http: Client,
    base: Url,
}

impl Endpoint {
    fn url(&self, segments: &[&str]) -> VsphereResult<Url> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|_| anyhow!("Not a base URL: {}", self.base))?
            .extend(segments);

        Ok(url)
    }
}

/// A `ManagedObjectReference`, e.g. `{ "type": "Task", "value": "task-12" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct MoRef {
    #[serde(rename = "_typeName", default = "MoRef::type_name")]
    type_name: String,

    #[serde(rename = "type")]
    kind: String,

    value: String,
}

impl MoRef {
    fn type_name() -> String {
        "ManagedObjectReference".into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceContent {
    root_folder: MoRef,
    view_manager: MoRef,
    session_manager: MoRef,
}

#[derive(Debug, Deserialize)]
struct VmConfigInfo {
    hardware: VmHardwareInfo,
}

#[derive(Debug, Deserialize)]
struct VmHardwareInfo {
    #[serde(default)]
    device: Vec<VsphereDevice>,
}

fn base_url(server: &str, release: &str) -> VsphereResult<Url> {
    let server = server.trim().trim_end_matches('/');

    let url = if server.contains("://") {
        server.to_owned()
    } else {
        format!("https://{}", server)
    };

    let mut url =
        Url::parse(&url).with_context(|| format!("Couldn't parse server address: {}", server))?;

    url.path_segments_mut()
        .map_err(|_| anyhow!("Server address cannot be used as a base URL: {}", server))?
        .pop_if_empty()
        .extend(["sdk", "vim25", release]);

    Ok(url)
}

fn send(request: RequestBuilder) -> VsphereResult<Response> {
    let response = request.send().context("Couldn't reach the endpoint")?;
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();

    Err(VsphereError::Api {
        status: status.as_u16(),
        message: describe_fault(&body),
    })
}

fn parse<T>(response: Response) -> VsphereResult<T>
where
    T: DeserializeOwned,
{
    let body = response.text().context("Couldn't read the response")?;

    tracing::trace!(%body, "response body");

    // Properties that aren't set (e.g. `snapshot`) come back as an empty body
    let body = if body.trim().is_empty() {
        "null"
    } else {
        body.as_str()
    };

    let value = serde_json::from_str(body)
        .with_context(|| format!("Couldn't parse the response: {}", truncate(body)))?;

    Ok(value)
}

/// Turns an error body (usually a serialized `MethodFault`) into a one-liner.
fn describe_fault(body: &str) -> String {
    let fault: Option<Value> = serde_json::from_str(body).ok();

    let fault_type = fault
        .as_ref()
        .and_then(|fault| fault.get("_typeName"))
        .and_then(Value::as_str);

    let message = fault
        .as_ref()
        .and_then(|fault| fault.get("faultMessage"))
        .and_then(Value::as_array)
        .and_then(|messages| {
            messages
                .iter()
                .find_map(|message| message.get("message").and_then(Value::as_str))
        });

    match (fault_type, message) {
        (Some(fault_type), Some(message)) => format!("{} ({})", fault_type, message),
        (Some(fault_type), None) => fault_type.to_owned(),
        _ => truncate(body.trim()),
    }
}

fn truncate(s: &str) -> String {
    const MAX_CHARS: usize = 500;

    if s.chars().count() > MAX_CHARS {
        format!("{}...", s.chars().take(MAX_CHARS).collect::<String>())
    } else {
        s.to_owned()
    }
}
