/*!

Key table streams.

A key table stream holds a sequence of records whose field names are replaced by numeric ids. The
names are written once, in a key table chunk at the very start of the stream.

```text
+===========+==========+==========+=====
| Key Table | Record 1 | Record 2 | ...
+===========+==========+==========+=====

- Key Table is a Container chunk with id 0
- Each Record is a Container chunk with id 1
```

# Ids

Ids 0 and 1 are reserved. Field ids are handed out from 2 upward, from a single counter, in two
tiers:

- Every container name gets one id, used for that name at any depth in any record.
- Every leaf name gets one id per enclosing container name. Leaves at the top level of a record
  are scoped to the record itself.

Since both tiers share the counter, no id is ever reused. A leaf and a container can share a
name and still be told apart.

# Key Table Layout

The table container holds the top-level leaf entries, then the container entries first seen at
the top level.

- A leaf entry is a Utf8String chunk whose id is the leaf id and whose payload is the name.
- A container entry is a Container chunk whose id is the container id. Its first child is a
  Utf8String chunk with id 0 holding the container's name. The leaf entries scoped to that
  container follow, then container entries first seen inside it.

Each container name has exactly one entry, nested under the scope where it was first seen.

```text
00 20 ..                        Key Table
   02 C0 08 "readings"          top-level leaf "readings" = 2
   03 20 ..                     container "site" = 3
      00 C0 04 "site"
      04 C0 09 "elevation"      leaf "elevation" under "site" = 4
      05 C0 04 "name"           leaf "name" under "site" = 5
```

# Records

A record chunk holds one chunk per field: a leaf chunk under the leaf's id, or a container
chunk under the container's id holding the nested record's fields. A field holding several
values is written as repeated sibling chunks under the same id, and a field with no value is
left out. On decode, repeated ids collect into a list in stream order.

*/
