use std::fs;
use std::path::Path;
use std::process::Command;

use caasp_env::{EnvError, Environment, Role, SshSettings, generate, output};

const STATE: &str = r#"{
    "version": 3,
    "terraform_version": "0.11.7",
    "serial": 12,
    "modules": [
        {
            "path": ["root"],
            "outputs": {},
            "resources": {
                "openstack_compute_instance_v2.admin": {
                    "type": "openstack_compute_instance_v2",
                    "depends_on": [],
                    "primary": {
                        "id": "0b3e2f6a-51c4-4c1e-9d8e-7a2b6c1d0e11",
                        "attributes": {
                            "access_ip_v4": "10.0.0.10",
                            "id": "0b3e2f6a-51c4-4c1e-9d8e-7a2b6c1d0e11",
                            "name": "caasp-admin"
                        }
                    }
                },
                "openstack_networking_floatingip_v2.admin_ext": {
                    "type": "openstack_networking_floatingip_v2",
                    "primary": {
                        "id": "f1",
                        "attributes": { "address": "192.0.2.10", "id": "f1" }
                    }
                },
                "openstack_compute_instance_v2.master": {
                    "type": "openstack_compute_instance_v2",
                    "primary": {
                        "id": "7c9d-11",
                        "attributes": {
                            "access_ip_v4": "10.0.0.11",
                            "id": "7c9d-11",
                            "name": "caasp-master"
                        }
                    }
                },
                "openstack_networking_floatingip_v2.master_ext": {
                    "type": "openstack_networking_floatingip_v2",
                    "primary": {
                        "id": "f2",
                        "attributes": { "address": "192.0.2.11", "id": "f2" }
                    }
                },
                "openstack_compute_instance_v2.worker.0": {
                    "type": "openstack_compute_instance_v2",
                    "primary": {
                        "id": "aa-bb-20",
                        "attributes": {
                            "access_ip_v4": "10.0.0.20",
                            "id": "aa-bb-20",
                            "name": "caasp-worker0"
                        }
                    }
                },
                "openstack_compute_instance_v2.worker.1": {
                    "type": "openstack_compute_instance_v2",
                    "primary": {
                        "id": "aa-bb-21",
                        "attributes": {
                            "access_ip_v4": "10.0.0.21",
                            "id": "aa-bb-21",
                            "name": "caasp-worker1"
                        }
                    }
                },
                "openstack_networking_network_v2.network": {
                    "type": "openstack_networking_network_v2",
                    "primary": {
                        "id": "net",
                        "attributes": { "id": "net", "name": "caasp-net" }
                    }
                }
            }
        }
    ]
}"#;

fn write_state(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("terraform.tfstate");
    fs::write(&path, contents).unwrap();
    path
}

fn ssh() -> SshSettings {
    SshSettings::new("root", "/work/../misc-files/id_shared")
}

#[test]
fn test_generate_admin_master_two_workers() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(dir.path(), STATE);

    let env = generate(&state, &ssh()).unwrap();

    let summary: Vec<(Role, &str)> = env
        .minions
        .iter()
        .map(|m| (m.role, m.index.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Role::Admin, "0"),
            (Role::Master, "1"),
            (Role::Worker, "2"),
            (Role::Worker, "3"),
        ]
    );

    assert_eq!(env.minions[0].minion_id, "0b3e2f6a51c44c1e9d8e7a2b6c1d0e11");
    assert!(env.minions.iter().all(|m| !m.minion_id.contains('-')));
    assert!(env.minions.iter().all(|m| m.status == "unused"));

    assert_eq!(env.dashboard_external_host, env.minions[0].addresses.public_ipv4);
    assert_eq!(env.dashboard_host, env.minions[0].addresses.private_ipv4);
    assert_eq!(env.dashboard_external_host, "192.0.2.10");
    assert_eq!(env.dashboard_host, "10.0.0.10");

    assert_eq!(
        env.kubernetes_external_host.as_deref(),
        Some(env.minions[1].addresses.public_ipv4.as_str())
    );
    assert_eq!(env.minions[1].addresses.public_ipv4, "192.0.2.11");
    assert_eq!(env.minions[1].addresses.private_ipv4, "10.0.0.11");

    assert_eq!(env.minions[2].fqdn, "caasp-worker0");
    assert_eq!(env.minions[2].addresses.public_ipv4, "10.0.0.20");
    assert_eq!(env.minions[2].addresses.private_ipv4, "10.0.0.20");
}

#[test]
fn test_generated_json_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(dir.path(), STATE);

    let env = generate(&state, &ssh()).unwrap();
    let json = output::render_json(&env).unwrap();

    let parsed: Environment = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, env);
}

#[test]
fn test_generate_flat_state_layout() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(
        dir.path(),
        r#"{
            "version": 4,
            "terraform_version": "1.5.7",
            "resources": [
                {
                    "mode": "managed",
                    "type": "openstack_compute_instance_v2",
                    "name": "admin",
                    "provider": "provider[\"registry.terraform.io/terraform-provider-openstack/openstack\"]",
                    "instances": [
                        { "attributes": { "id": "ad-01", "name": "admin", "access_ip_v4": "10.1.0.2" } }
                    ]
                },
                {
                    "mode": "managed",
                    "type": "openstack_compute_instance_v2",
                    "name": "master",
                    "instances": [
                        { "index_key": 1, "attributes": { "id": "m-1", "name": "master1", "access_ip_v4": "10.1.0.4" } },
                        { "index_key": 0, "attributes": { "id": "m-0", "name": "master0", "access_ip_v4": "10.1.0.3" } }
                    ]
                },
                {
                    "mode": "managed",
                    "type": "openstack_networking_floatingip_v2",
                    "name": "master_ext",
                    "instances": [
                        { "index_key": 0, "attributes": { "address": "198.51.100.3" } },
                        { "index_key": 1, "attributes": { "address": "198.51.100.4" } }
                    ]
                }
            ]
        }"#,
    );

    let env = generate(&state, &ssh()).unwrap();

    assert_eq!(env.minions.len(), 3);
    assert_eq!(env.minions[1].fqdn, "master0");
    assert_eq!(env.minions[2].fqdn, "master1");
    assert_eq!(env.kubernetes_external_host.as_deref(), Some("198.51.100.3"));
    assert_eq!(env.minions[2].addresses.public_ipv4, "198.51.100.4");
}

#[test]
fn test_generate_missing_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = generate(&dir.path().join("terraform.tfstate"), &ssh());
    assert!(matches!(result, Err(EnvError::StateNotFound { .. })));
}

#[test]
fn test_generate_missing_attribute() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(
        dir.path(),
        r#"{"modules": [{"resources": {
            "openstack_compute_instance_v2.admin": {"primary": {"attributes": {"id": "a", "name": "admin"}}}
        }}]}"#,
    );

    match generate(&state, &ssh()) {
        Err(EnvError::MissingAttribute { attribute, .. }) => assert_eq!(attribute, "access_ip_v4"),
        other => panic!("expected MissingAttribute, got {:?}", other),
    }
}

fn binary(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_caasp-env"));
    cmd.current_dir(dir)
        .env_remove("TFSTATE_FILE")
        .env_remove("CAASP_SSH_USER")
        .env_remove("CAASP_SSH_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_prints_environment() {
    let dir = tempfile::tempdir().unwrap();
    write_state(dir.path(), STATE);

    let out = binary(dir.path()).output().unwrap();
    assert!(out.status.success());

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["sshUser"], "root");
    assert!(
        value["sshKey"]
            .as_str()
            .unwrap()
            .ends_with("/../misc-files/id_shared")
    );
    assert_eq!(value["minions"].as_array().unwrap().len(), 4);
    assert_eq!(value["kubernetesExternalHost"], "192.0.2.11");
}

#[test]
fn test_binary_missing_state_file_exits_1() {
    let dir = tempfile::tempdir().unwrap();

    let out = binary(dir.path()).output().unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("The Terraform state file 'terraform.tfstate' could not be found."));
}

#[test]
fn test_binary_missing_admin_emits_no_json() {
    let dir = tempfile::tempdir().unwrap();
    write_state(dir.path(), r#"{"modules": [{"resources": {}}]}"#);

    let out = binary(dir.path()).output().unwrap();

    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn test_generate_ignores_unused_resource_with_null_primary() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(
        dir.path(),
        r#"{"version": 3, "modules": [{"resources": {
            "null_resource.x": {"primary": null},
            "openstack_compute_instance_v2.admin": {"primary": {"attributes": {
                "id": "ad-01", "name": "admin", "access_ip_v4": "10.0.0.2"
            }}}
        }}]}"#,
    );

    let env = generate(&state, &ssh()).unwrap();

    assert_eq!(env.minions.len(), 1);
    assert_eq!(env.minions[0].minion_id, "ad01");
    assert_eq!(env.dashboard_host, "10.0.0.2");
}
