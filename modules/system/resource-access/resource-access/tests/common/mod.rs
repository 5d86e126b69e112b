#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared fixture: a small VM inventory registry and schema.

use resource_access::{ResourceAccessConfig, ResourceAccessService, StaticSchema};

pub const FIXTURE: &str = r"
api_prefix: /api
supported_versions: [v1, v2.1]
collections:
  vms:
    description: Virtual Machines
    klass: Vm
    verbs: [get, post, patch, delete]
    options: [collection, custom_actions]
    identifying_attrs: [name]
    subcollections: [tags]
    handlers:
      - read_resource
      - create_resource
      - edit_resource
      - delete_resource
      - start_resource
      - tags_read_resource
      - tags_assign_resource
    collection_actions:
      get:
        - { name: read, identifier: vm_show_list }
      post:
        - { name: create, identifier: vm_create }
        - { name: start, identifier: [vm_start, vm_admin] }
        - { name: stop, identifier: vm_stop, disabled: true }
    resource_actions:
      get:
        - { name: read, identifier: vm_show }
      patch:
        - { name: edit, identifier: vm_edit, validate: validate_vm_edit }
      delete:
        - { name: delete, identifier: vm_delete }
      post:
        - { name: start, identifier: [vm_start, vm_admin] }
        - { name: custom_thing }
        - { name: retire, identifier: vm_retire, disabled: true }
  tags:
    description: Tags
    klass: Tag
    verbs: [get, post]
    options: [subcollection]
    subcollection_actions:
      get:
        - { name: read }
      post:
        - { name: assign, identifier: tag_assign }
    subresource_actions:
      get:
        - { name: read }
  hosts:
    description: Hosts
    klass: Host
    verbs: [get]
    options: [collection]
    collection_actions:
      get:
        - { name: read }
types:
  Vm:
    attributes:
      id: integer
      name: string
      power_state: string
      retires_on: datetime
      created_on: date
      tags: string_set
    virtual_attributes:
      archived: boolean
    associations:
      host: Host
  Host:
    attributes:
      id: integer
      name: string
    associations:
      hardware: Hardware
  Hardware:
    attributes:
      memory_mb: integer
  Tag:
    attributes:
      id: integer
      name: string
";

pub fn config() -> ResourceAccessConfig {
    ResourceAccessConfig::from_yaml_str(FIXTURE).unwrap()
}

pub fn schema() -> StaticSchema {
    StaticSchema::new(config().types)
}

pub fn service() -> ResourceAccessService {
    ResourceAccessService::from_config(&config()).unwrap()
}
